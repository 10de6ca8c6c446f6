//! CART decision tree shared by the forest and boosting families.
//!
//! Split search runs on sufficient statistics `(count, sum, sum of squares)`,
//! which covers both Gini impurity on 0/1 targets and squared error on
//! real-valued residuals.

use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ports::ModelError;

const MIN_GAIN: f64 = 1e-12;

/// Impurity measure used to score splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Targets must be 0.0 or 1.0
    Gini,
    SquaredError,
}

/// Growth limits of one tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl TreeParams {
    fn validate(&self) -> Result<(), ModelError> {
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_depth == Some(0) || self.max_features == Some(0) {
            return Err(ModelError::InvalidParameter(
                "max_depth and max_features must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    count: f64,
    sum: f64,
    sum_sq: f64,
}

impl Stats {
    fn push(&mut self, y: f64) {
        self.count += 1.0;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn minus(&self, other: &Self) -> Self {
        Self {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.sum / self.count
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.count == 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        match criterion {
            Criterion::Gini => 2.0 * mean * (1.0 - mean),
            Criterion::SquaredError => (self.sum_sq / self.count - mean * mean).max(0.0),
        }
    }
}

/// A tree node; children are indices into the node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression/probability tree.
///
/// Leaves hold the mean target of their training samples, which for 0/1
/// targets is the class-1 probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'x, 'y> {
    x: ArrayView2<'x, f64>,
    y: &'y [f64],
    params: TreeParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples`.
    ///
    /// `samples` may repeat rows (bootstrap draws).
    ///
    /// # Errors
    /// Returns error if parameters are invalid, `samples` is empty or the
    /// target length differs from the row count.
    pub fn fit<R: Rng + ?Sized>(
        x: ArrayView2<'_, f64>,
        y: &[f64],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        if samples.is_empty() || x.nrows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != x.nrows() {
            return Err(ModelError::InvalidParameter(format!(
                "{} targets for {} rows",
                y.len(),
                x.nrows()
            )));
        }

        let mut builder = Builder {
            x,
            y,
            params: *params,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.grow(samples.to_vec(), 0, rng);

        let mut importances = builder.importances;
        normalize(&mut importances);

        Ok(Self {
            nodes: builder.nodes,
            n_features: x.ncols(),
            importances,
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Normalised impurity decrease per feature; all zeros for a stump.
    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Check that the arena is a forward-only tree over `n_features` columns,
    /// so `leaf_index` always terminates in bounds.
    ///
    /// # Errors
    /// Returns a description of the first broken node.
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {id} splits on feature {feature} of {n_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(format!("node {id} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Arena index of the leaf reached by `row`.
    #[must_use]
    pub fn leaf_index(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { .. } => return id,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match &self.nodes[self.leaf_index(row)] {
            Node::Leaf { value } => *value,
            Node::Split { .. } => 0.0,
        }
    }

    /// Overwrite the value of a leaf; ignored for split nodes.
    pub fn set_leaf_value(&mut self, leaf: usize, value: f64) {
        if let Some(Node::Leaf { value: v }) = self.nodes.get_mut(leaf) {
            *v = value;
        }
    }
}

impl Builder<'_, '_> {
    fn grow<R: Rng + ?Sized>(
        &mut self,
        mut samples: Vec<usize>,
        depth: usize,
        rng: &mut R,
    ) -> usize {
        let stats = samples.iter().fold(Stats::default(), |mut s, &i| {
            s.push(self.y[i]);
            s
        });
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: stats.mean(),
        });

        let n = samples.len();
        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || stats.impurity(self.params.criterion) <= MIN_GAIN
        {
            return id;
        }

        let Some(split) = self.best_split(&mut samples, &stats, rng) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);
        self.importances[split.feature] += split.gain;

        let left = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split<R: Rng + ?Sized>(
        &self,
        samples: &mut [usize],
        total: &Stats,
        rng: &mut R,
    ) -> Option<Split> {
        let n_features = self.x.ncols();
        let features: Vec<usize> = match self.params.max_features {
            Some(m) if m < n_features => rand::seq::index::sample(rng, n_features, m).into_vec(),
            _ => (0..n_features).collect(),
        };

        let criterion = self.params.criterion;
        let min_leaf = self.params.min_samples_leaf;
        let parent = total.count * total.impurity(criterion);
        let mut best: Option<Split> = None;

        for feature in features {
            samples.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = Stats::default();
            for pos in 0..samples.len() - 1 {
                left.push(self.y[samples[pos]]);
                let n_left = pos + 1;
                if n_left < min_leaf || samples.len() - n_left < min_leaf {
                    continue;
                }
                let here = self.x[[samples[pos], feature]];
                let next = self.x[[samples[pos + 1], feature]];
                if here >= next {
                    continue;
                }

                let right = total.minus(&left);
                let children =
                    left.count * left.impurity(criterion) + right.count * right.impurity(criterion);
                let gain = parent - children;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mid = here + (next - here) / 2.0;
                    best = Some(Split {
                        feature,
                        threshold: if mid < next { mid } else { here },
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Scale non-negative weights to sum to one; leaves all-zero input alone.
pub(crate) fn normalize(weights: &mut [f64]) {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
    }
}
