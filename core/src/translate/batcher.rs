use crate::translate::tokens::TokenEstimator;

/// One extracted string and its caller-assigned position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub index: usize,
    pub text: String,
}

impl TranslationUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Units dispatched together in one remote request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    units: Vec<TranslationUnit>,
    estimated_tokens: usize,
}

impl Batch {
    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<TranslationUnit> {
        self.units
    }

    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.text.clone()).collect()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.units.iter().map(|unit| unit.index).collect()
    }

    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn push(&mut self, unit: TranslationUnit, tokens: usize) {
        self.units.push(unit);
        self.estimated_tokens += tokens;
    }
}

/// Greedy, order-preserving packer bounded by a token budget.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    limit: usize,
    estimator: TokenEstimator,
}

impl Batcher {
    pub const fn new(limit: usize, estimator: TokenEstimator) -> Self {
        Self { limit, estimator }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn estimator(&self) -> TokenEstimator {
        self.estimator
    }

    /// Packs units in input order. A unit that alone exceeds the limit still
    /// gets a batch of its own.
    pub fn pack<I>(&self, units: I) -> Vec<Batch>
    where
        I: IntoIterator<Item = TranslationUnit>,
    {
        let mut batches = Vec::new();
        let mut current = Batch::default();

        for unit in units {
            let tokens = self.estimator.estimate(&unit.text);
            if current.estimated_tokens + tokens > self.limit && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
            }
            current.push(unit, tokens);
        }

        if !current.is_empty() {
            batches.push(current);
        }

        batches
    }
}
