//! Id-keyed record collections backing the content catalog.
//!
//! The CMS that owns these collections lives outside this process; the core
//! only needs CRUD on opaque records keyed by an id field. The in-memory
//! implementation here preserves insertion order, which the leaderboard and
//! history rely on.

use crate::error::{GameError, GameResult};
use crate::types::*;
use tokio::sync::RwLock;

/// A record held in an id-keyed collection
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Puzzle {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for PlayerProfile {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for GameRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One collection of records, insertion-ordered
pub struct Collection<T: Record> {
    items: RwLock<Vec<T>>,
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn fetch_all(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn fetch_by_id(&self, id: &str) -> Option<T> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn create(&self, item: T) -> T {
        self.items.write().await.push(item.clone());
        item
    }

    /// Replace the record with the same id
    pub async fn update(&self, item: T) -> GameResult<T> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item.clone();
                Ok(item)
            }
            None => Err(GameError::NotFound("record".to_string())),
        }
    }

    pub async fn delete(&self, id: &str) -> GameResult<()> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            Err(GameError::NotFound("record".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All collections the game core reads and writes
pub struct Catalog {
    pub tasks: Collection<Task>,
    pub puzzles: Collection<Puzzle>,
    pub profiles: Collection<PlayerProfile>,
    pub records: Collection<GameRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tasks: Collection::new(),
            puzzles: Collection::new(),
            profiles: Collection::new(),
            records: Collection::new(),
        }
    }

    /// Catalog pre-seeded with the stock tasks and puzzles
    pub async fn with_stock_content() -> Self {
        let catalog = Self::new();

        catalog
            .tasks
            .create(Task {
                id: "two-sum".to_string(),
                title: "Two Sum".to_string(),
                prompt: "Given an array of integers and a target, return indices of the two \
                         numbers that add up to the target."
                    .to_string(),
                boilerplate: Some("function solution(nums, target) {\n  // your code\n}".to_string()),
                difficulty: Difficulty::Easy,
                level: None,
                hints: vec![
                    "A hash map gets you to O(n).".to_string(),
                    "Store each value's index as you scan.".to_string(),
                ],
                test_cases: vec![
                    TestCase {
                        input: "nums = [2,7,11,15], target = 9".to_string(),
                        expected_output: "[0,1]".to_string(),
                    },
                    TestCase {
                        input: "nums = [3,2,4], target = 6".to_string(),
                        expected_output: "[1,2]".to_string(),
                    },
                    TestCase {
                        input: "nums = [3,3], target = 6".to_string(),
                        expected_output: "[0,1]".to_string(),
                    },
                ],
                allowed_languages: Vec::new(),
            })
            .await;

        catalog
            .tasks
            .create(Task {
                id: "binary-search".to_string(),
                title: "Binary Search".to_string(),
                prompt: "Given a sorted array and a target, return the target's index or -1."
                    .to_string(),
                boilerplate: None,
                difficulty: Difficulty::Medium,
                level: None,
                hints: vec!["Halve the search window each step.".to_string()],
                test_cases: vec![
                    TestCase {
                        input: "nums = [-1,0,3,5,9,12], target = 9".to_string(),
                        expected_output: "4".to_string(),
                    },
                    TestCase {
                        input: "nums = [-1,0,3,5,9,12], target = 2".to_string(),
                        expected_output: "-1".to_string(),
                    },
                ],
                allowed_languages: Vec::new(),
            })
            .await;

        catalog
            .tasks
            .create(Task {
                id: "valid-palindrome".to_string(),
                title: "Valid Palindrome".to_string(),
                prompt: "Return true if the string reads the same forwards and backwards, \
                         considering only alphanumeric characters."
                    .to_string(),
                boilerplate: None,
                difficulty: Difficulty::Hard,
                level: Some(5),
                hints: Vec::new(),
                test_cases: vec![
                    TestCase {
                        input: "s = \"A man, a plan, a canal: Panama\"".to_string(),
                        expected_output: "true".to_string(),
                    },
                    TestCase {
                        input: "s = \"race a car\"".to_string(),
                        expected_output: "false".to_string(),
                    },
                ],
                allowed_languages: Vec::new(),
            })
            .await;

        catalog
            .puzzles
            .create(Puzzle {
                id: "the-breach".to_string(),
                title: "The Breach".to_string(),
                question: "The login form echoed a database error when given a single quote. \
                           What attack was used against it?"
                    .to_string(),
                correct_answer: "sql injection".to_string(),
                difficulty: Difficulty::Medium,
                hints: vec![
                    "Think about web vulnerabilities.".to_string(),
                    "The input reached the query unescaped.".to_string(),
                ],
            })
            .await;

        catalog
            .puzzles
            .create(Puzzle {
                id: "the-inside-job".to_string(),
                title: "The Inside Job".to_string(),
                question: "Logs show a valid badge entered the server room at 03:00, but the \
                           badge's owner was abroad. What kind of attack is this?"
                    .to_string(),
                correct_answer: "cloning".to_string(),
                difficulty: Difficulty::Hard,
                hints: vec!["The badge itself was genuine hardware.".to_string()],
            })
            .await;

        catalog
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
