use crate::alignment::Alignment;
use crate::error::{AlignmentError, Result};

/// Corpus-level alignment quality counts.
///
/// When gold links carry sure/probable tags the sure links form `S` and
/// all gold links form `P`; untagged gold is treated as entirely sure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignEval {
    pub matches: usize,
    pub total_test: usize,
    pub total_gold: usize,
    pub sure_matches: usize,
    pub prob_matches: usize,
    pub total_sure: usize,
    pub total_prob: usize,
    tagged: bool,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl AlignEval {
    pub fn new(test: &[Alignment], gold: &[Alignment]) -> Result<Self> {
        if test.len() != gold.len() {
            return Err(AlignmentError::EvalLengthMismatch {
                test: test.len(),
                gold: gold.len(),
            });
        }
        let mut eval = AlignEval::default();
        for (t, g) in test.iter().zip(gold) {
            eval.add(t, g);
        }
        Ok(eval)
    }

    /// Accumulates one sentence pair.
    pub fn add(&mut self, test: &Alignment, gold: &Alignment) {
        self.matches += (test & gold).len();
        self.total_test += test.len();
        self.total_gold += gold.len();

        let sure = if gold.has_confidence_tags() {
            self.tagged = true;
            gold.sure()
        } else {
            gold.clone()
        };
        self.sure_matches += (test & &sure).len();
        self.total_sure += sure.len();
        self.prob_matches += (test & gold).len();
        self.total_prob += gold.len();
    }

    pub fn precision(&self) -> f64 {
        if self.tagged {
            ratio(self.prob_matches, self.total_test)
        } else {
            ratio(self.matches, self.total_test)
        }
    }

    pub fn recall(&self) -> f64 {
        if self.tagged {
            ratio(self.sure_matches, self.total_sure)
        } else {
            ratio(self.matches, self.total_gold)
        }
    }

    pub fn f_measure(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Alignment Error Rate; the sure/probable form once any gold link is tagged.
    pub fn aer(&self) -> f64 {
        if self.tagged {
            let den = self.total_test + self.total_sure;
            if den == 0 {
                return 0.0;
            }
            1.0 - ratio(self.sure_matches + self.prob_matches, den)
        } else {
            let den = self.total_test + self.total_gold;
            if den == 0 {
                return 0.0;
            }
            1.0 - ratio(2 * self.matches, den)
        }
    }
}
