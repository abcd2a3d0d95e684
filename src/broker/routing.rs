//! Shard routing
//!
//! A job's priority selects a contiguous band of source queues; the distribution key
//! then picks one queue inside that band. The choice depends only on the inputs, so every
//! orchestrator instance routes the same host to the same queue.

use crate::broker::traits::{BrokerError, BrokerResult, ShardingMethod};
use sha2::{Digest, Sha256};

/// Selects the destination queue for a job
///
/// Priorities below zero use the first band; priorities past the last band use the last.
///
/// # Examples
///
/// ```
/// use crawl_starter::broker::{select_queue, ShardingMethod};
///
/// let queues: Vec<String> = vec!["q0".into(), "q1".into(), "q2".into()];
/// // one normal queue, two high-priority queues
/// let queue = select_queue(&queues, ShardingMethod::Hash, &[1, 2], 0, "a.example").unwrap();
/// assert_eq!(queue, "q0");
/// ```
pub fn select_queue(
    queues: &[String],
    method: ShardingMethod,
    dimensions: &[u32],
    priority: i32,
    key: &str,
) -> BrokerResult<String> {
    let (offset, len) = priority_band(dimensions, priority)?;

    let band = queues.get(offset..offset + len).ok_or_else(|| {
        BrokerError::Routing(format!(
            "priority band {}..{} exceeds the {} configured queues",
            offset,
            offset + len,
            queues.len()
        ))
    })?;

    let queue = match method {
        ShardingMethod::Hash => {
            let index = (stable_hash(&[key]) % band.len() as u64) as usize;
            &band[index]
        }
        ShardingMethod::Balance => band
            .iter()
            .max_by_key(|queue| stable_hash(&[key, queue.as_str()]))
            .ok_or_else(|| BrokerError::Routing("empty priority band".to_string()))?,
    };

    Ok(queue.clone())
}

/// Returns `(offset, len)` of the queue band for a priority
fn priority_band(dimensions: &[u32], priority: i32) -> BrokerResult<(usize, usize)> {
    if dimensions.is_empty() {
        return Err(BrokerError::Routing("no priority dimensions".to_string()));
    }

    let band = (priority.max(0) as usize).min(dimensions.len() - 1);
    let offset: u32 = dimensions[..band].iter().sum();
    let len = dimensions[band];

    if len == 0 {
        return Err(BrokerError::Routing(format!(
            "priority band {} has no queues",
            band
        )));
    }

    Ok((offset as usize, len as usize))
}

/// First 8 bytes of the SHA-256 digest of the NUL-joined parts
fn stable_hash(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("crawler_{:02}", i)).collect()
    }

    #[test]
    fn test_priority_band_offsets() {
        assert_eq!(priority_band(&[2, 3, 1], 0).unwrap(), (0, 2));
        assert_eq!(priority_band(&[2, 3, 1], 1).unwrap(), (2, 3));
        assert_eq!(priority_band(&[2, 3, 1], 2).unwrap(), (5, 1));
    }

    #[test]
    fn test_priority_band_clamped() {
        assert_eq!(priority_band(&[2, 3], -4).unwrap(), (0, 2));
        assert_eq!(priority_band(&[2, 3], 99).unwrap(), (2, 3));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let queues = queues(8);
        for method in [ShardingMethod::Balance, ShardingMethod::Hash] {
            let a = select_queue(&queues, method, &[8], 0, "a.example").unwrap();
            let b = select_queue(&queues, method, &[8], 0, "a.example").unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_queue_stays_inside_band() {
        let queues = queues(4);
        for host in ["a.example", "b.example", "c.example", "d.example", "e.example"] {
            let high = select_queue(&queues, ShardingMethod::Balance, &[1, 3], 1, host).unwrap();
            assert_ne!(high, "crawler_00");

            let normal = select_queue(&queues, ShardingMethod::Hash, &[1, 3], 0, host).unwrap();
            assert_eq!(normal, "crawler_00");
        }
    }

    #[test]
    fn test_keys_spread_over_queues() {
        let queues = queues(4);
        let used: std::collections::HashSet<String> = (0..200)
            .map(|i| {
                let key = format!("host{}.example", i);
                select_queue(&queues, ShardingMethod::Balance, &[4], 0, &key).unwrap()
            })
            .collect();
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn test_balance_moves_few_keys_when_queue_added() {
        let small = queues(4);
        let large = queues(5);
        let moved = (0..200)
            .filter(|i| {
                let key = format!("host{}.example", i);
                let before = select_queue(&small, ShardingMethod::Balance, &[4], 0, &key).unwrap();
                let after = select_queue(&large, ShardingMethod::Balance, &[5], 0, &key).unwrap();
                before != after
            })
            .count();

        // every moved key went to the new queue, roughly a fifth of them
        assert!(moved > 0 && moved < 100, "moved {} of 200 keys", moved);
    }

    #[test]
    fn test_band_exceeding_queues_fails() {
        let result = select_queue(&queues(2), ShardingMethod::Hash, &[1, 2], 1, "a.example");
        assert!(matches!(result, Err(BrokerError::Routing(_))));
    }

    #[test]
    fn test_no_dimensions_fails() {
        let result = select_queue(&queues(2), ShardingMethod::Hash, &[], 0, "a.example");
        assert!(matches!(result, Err(BrokerError::Routing(_))));
    }
}
