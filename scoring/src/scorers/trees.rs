use serde::{Deserialize, Serialize};

use crate::{error::ModelLoadError, scorers::{sigmoid, ProbabilityModel}};

/// A node of a flattened decision tree. The root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Goes `left` when `features[feature] < threshold`, `right` otherwise.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { leaf: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Walks from the root to a leaf. Children always follow their parent,
    /// which `validate` enforces, so the walk terminates.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, tree: usize, arity: usize, leaf_range: Option<(f64, f64)>) -> Result<(), ModelLoadError> {
        let invalid = |reason: String| ModelLoadError::InvalidTree { tree, reason };

        if self.nodes.is_empty() {
            return Err(invalid("tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= arity {
                        return Err(invalid(format!(
                            "node {} splits on feature {} but only {} features exist",
                            index, feature, arity
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(format!("node {} has a NaN threshold", index)));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "node {} points to child {} outside ({}, {})",
                                index,
                                child,
                                index,
                                self.nodes.len()
                            )));
                        }
                    }
                }
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(invalid(format!("leaf {} is not finite", index)));
                    }
                    if let Some((low, high)) = leaf_range {
                        if *leaf < low || *leaf > high {
                            return Err(invalid(format!(
                                "leaf {} value {} outside [{}, {}]",
                                index, leaf, low, high
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Boosted ensemble with a logistic objective: sigmoid(base_score + sum of leaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl ProbabilityModel for GradientBoostedTrees {
    fn predict_probability(&self, features: &[f64]) -> f64 {
        let margin = self.base_score + self.trees.iter().map(|t| t.evaluate(features)).sum::<f64>();
        sigmoid(margin)
    }

    fn validate(&self, arity: usize) -> Result<(), ModelLoadError> {
        if !self.base_score.is_finite() {
            return Err(ModelLoadError::InvalidParameter {
                component: "gradient_boosted_trees",
                reason: "base_score must be finite".to_string(),
            });
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::InvalidParameter {
                component: "gradient_boosted_trees",
                reason: "ensemble has no trees".to_string(),
            });
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i, arity, None))
    }

    fn kind(&self) -> &'static str {
        "gradient_boosted_trees"
    }
}

/// Bagged ensemble whose leaves hold positive-class probabilities; the
/// prediction is their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
}

impl ProbabilityModel for RandomForest {
    fn predict_probability(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        total / self.trees.len() as f64
    }

    fn validate(&self, arity: usize) -> Result<(), ModelLoadError> {
        if self.trees.is_empty() {
            return Err(ModelLoadError::InvalidParameter {
                component: "random_forest",
                reason: "forest has no trees".to_string(),
            });
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i, arity, Some((0.0, 1.0))))
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}
