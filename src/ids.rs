//! 为新建节点生成唯一id

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// 生成在整棵树生命周期内唯一的id
///
/// 实现必须能被多个线程同时调用
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// 随机的 v4 UUID
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// 递增的 `prefix-N`, 主要用于需要确定输出的场景
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("node")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_uuid_ids_are_distinct() {
        let ids = UuidIds;
        let generated: HashSet<String> = (0..100).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 100);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("r");
        assert_eq!(ids.next_id(), "r-1");
        assert_eq!(ids.next_id(), "r-2");
    }

    #[test]
    fn test_sequential_ids_across_threads() {
        let ids = Arc::new(SequentialIds::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..50).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 200);
    }
}
