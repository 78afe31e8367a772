use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub const DEFAULT_RATING_EPSILON: f64 = 0.1;

/// 可以被抽樣的候選項目，以 id 去重
pub trait Candidate {
    fn identity(&self) -> &str;
    fn rating(&self) -> f64;
}

/// 依評分加權、不放回的隨機抽樣
pub struct RankingSampler {
    rng: StdRng,
    epsilon: f64,
}

impl RankingSampler {
    pub fn new(epsilon: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), epsilon)
    }

    pub fn seeded(seed: u64, epsilon: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), epsilon)
    }

    pub fn with_rng(rng: StdRng, epsilon: f64) -> Self {
        Self { rng, epsilon }
    }

    /// 評分加上 ε，零分的店家仍有被抽到的機會
    pub fn weight_of(&self, rating: f64) -> f64 {
        if rating.is_finite() && rating > 0.0 {
            rating + self.epsilon
        } else {
            self.epsilon
        }
    }

    /// 從 primary 抽出最多 k 個；primary 不夠時併入 fallback 裡還沒出現過的項目繼續抽。
    pub fn sample<T: Candidate>(&mut self, primary: Vec<T>, fallback: Vec<T>, k: usize) -> Vec<T> {
        let mut picked = Vec::with_capacity(k);
        if k == 0 {
            return picked;
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut pool: Vec<(T, f64)> = Vec::new();
        self.extend_pool(&mut pool, &mut seen, primary);

        self.draw_weighted(&mut pool, &mut picked, k);

        if picked.len() < k && !fallback.is_empty() {
            tracing::debug!(
                "Primary pool exhausted after {} picks, widening with {} fallback candidates",
                picked.len(),
                fallback.len()
            );
            self.extend_pool(&mut pool, &mut seen, fallback);
            self.draw_weighted(&mut pool, &mut picked, k);
        }

        // 權重不可用時剩下的名額均勻補滿
        while picked.len() < k && !pool.is_empty() {
            let index = self.rng.gen_range(0..pool.len());
            picked.push(pool.swap_remove(index).0);
        }

        picked
    }

    fn extend_pool<T: Candidate>(
        &self,
        pool: &mut Vec<(T, f64)>,
        seen: &mut HashSet<String>,
        candidates: Vec<T>,
    ) {
        for candidate in candidates {
            if seen.insert(candidate.identity().to_string()) {
                let weight = self.weight_of(candidate.rating());
                pool.push((candidate, weight));
            }
        }
    }

    fn draw_weighted<T>(&mut self, pool: &mut Vec<(T, f64)>, picked: &mut Vec<T>, k: usize) {
        while picked.len() < k && !pool.is_empty() {
            let total: f64 = pool.iter().map(|(_, w)| *w).sum();
            if !(total.is_finite() && total > 0.0) {
                return;
            }

            let target = self.rng.gen_range(0.0..total);
            let mut running = 0.0;
            // 浮點誤差時落到最後一個
            let mut chosen = pool.len() - 1;
            for (index, (_, weight)) in pool.iter().enumerate() {
                running += weight;
                if running > target {
                    chosen = index;
                    break;
                }
            }

            picked.push(pool.remove(chosen).0);
        }
    }
}

impl Default for RankingSampler {
    fn default() -> Self {
        Self::new(DEFAULT_RATING_EPSILON)
    }
}
