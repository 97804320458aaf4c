use std::collections::HashMap;

use crate::formats::Book;
use crate::normalize::{Bucket, Field, normalize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket: Bucket,
    pub count: usize,
    /// Index of the first record that landed in this bucket; used for stable tie-breaks.
    pub first_seen: usize,
}

/// Exact per-bucket counts, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    entries: Vec<BucketCount>,
    index: HashMap<Bucket, usize>,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` observations of `bucket`, first seen at `first_seen`.
    /// Merging keeps the smallest `first_seen`, so the result does not depend
    /// on the order observations arrive in.
    pub fn add(&mut self, bucket: Bucket, count: usize, first_seen: usize) {
        if count == 0 {
            return;
        }
        match self.index.get(&bucket) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                entry.count += count;
                entry.first_seen = entry.first_seen.min(first_seen);
            }
            None => {
                self.index.insert(bucket.clone(), self.entries.len());
                self.entries.push(BucketCount {
                    bucket,
                    count,
                    first_seen,
                });
            }
        }
    }

    pub fn get(&self, bucket: &Bucket) -> usize {
        self.index
            .get(bucket)
            .map_or(0, |&pos| self.entries[pos].count)
    }

    pub fn contains(&self, bucket: &Bucket) -> bool {
        self.index.contains_key(bucket)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BucketCount> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<BucketCount> {
        self.entries
    }
}

pub fn aggregate(books: &[Book], field: Field) -> Counts {
    let mut counts = Counts::new();
    for (idx, book) in books.iter().enumerate() {
        counts.add(normalize(book, field), 1, idx);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre_books(genres: &[&str]) -> Vec<Book> {
        genres
            .iter()
            .map(|genre| Book {
                title: format!("Book about {genre}"),
                genre: Some((*genre).to_owned()),
                ..Book::default()
            })
            .collect()
    }

    #[test]
    fn counts_are_exact_and_keep_first_seen() {
        let books = genre_books(&["Sci-Fi", "Romance", "Sci-Fi", "", "Romance", "Sci-Fi"]);
        let counts = aggregate(&books, Field::Genre);

        assert_eq!(counts.total(), books.len());
        assert_eq!(counts.get(&Bucket::Text("Sci-Fi".to_owned())), 3);
        assert_eq!(counts.get(&Bucket::Text("Romance".to_owned())), 2);
        assert_eq!(counts.get(&Bucket::Unknown), 1);
        assert_eq!(counts.get(&Bucket::Other), 0);

        let first_seen: Vec<(String, usize)> = counts
            .iter()
            .map(|entry| (entry.bucket.label(), entry.first_seen))
            .collect();
        assert_eq!(
            first_seen,
            vec![
                ("Sci-Fi".to_owned(), 0),
                ("Romance".to_owned(), 1),
                ("Unknown".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn reversed_input_gives_same_counts() {
        let mut books = genre_books(&["A", "B", "B", "C", "C", "C"]);
        let forward = aggregate(&books, Field::Genre);
        books.reverse();
        let backward = aggregate(&books, Field::Genre);

        for entry in forward.iter() {
            assert_eq!(backward.get(&entry.bucket), entry.count);
        }
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn merging_keeps_earliest_index() {
        let mut counts = Counts::new();
        counts.add(Bucket::Other, 2, 7);
        counts.add(Bucket::Other, 1, 3);
        counts.add(Bucket::Other, 0, 0);
        let entry = counts.iter().next().expect("entry");
        assert_eq!(entry.count, 3);
        assert_eq!(entry.first_seen, 3);
    }

    #[test]
    fn empty_input_has_no_buckets() {
        let counts = aggregate(&[], Field::Publisher);
        assert!(counts.is_empty());
        assert_eq!(counts.total(), 0);
    }
}
