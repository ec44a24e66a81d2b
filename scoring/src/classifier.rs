use crate::error::ClassifierError;

#[derive(Debug, Clone, PartialEq)]
pub struct CutPoint {
    pub above: f64,
    pub label: String,
}

impl CutPoint {
    pub fn new(above: f64, label: impl Into<String>) -> Self {
        Self {
            above,
            label: label.into(),
        }
    }
}

/// Maps a probability to a risk label through ordered cut-points.
///
/// Cut-points are checked from the highest down; a probability takes the
/// label of the first cut-point it strictly exceeds, otherwise the floor
/// label. Callers must classify the unrounded probability.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskClassifier {
    cut_points: Vec<CutPoint>,
    floor_label: String,
}

impl RiskClassifier {
    pub fn new(mut cut_points: Vec<CutPoint>, floor_label: impl Into<String>) -> Result<Self, ClassifierError> {
        let floor_label = floor_label.into();
        if floor_label.trim().is_empty() {
            return Err(ClassifierError::EmptyLabel);
        }
        for cut in &cut_points {
            if !cut.above.is_finite() || !(0.0..=1.0).contains(&cut.above) {
                return Err(ClassifierError::OutOfRange(cut.above));
            }
            if cut.label.trim().is_empty() {
                return Err(ClassifierError::EmptyLabel);
            }
        }

        cut_points.sort_by(|a, b| b.above.total_cmp(&a.above));
        if let Some(pair) = cut_points.windows(2).find(|pair| pair[0].above == pair[1].above) {
            return Err(ClassifierError::Duplicate(pair[0].above));
        }

        Ok(Self {
            cut_points,
            floor_label,
        })
    }

    /// `> 0.7` High, `> 0.4` Medium, otherwise Low.
    pub fn three_tier() -> Self {
        Self {
            cut_points: vec![CutPoint::new(0.7, "High"), CutPoint::new(0.4, "Medium")],
            floor_label: "Low".to_string(),
        }
    }

    /// `> 0.6` High Risk, otherwise Safe.
    pub fn two_tier() -> Self {
        Self {
            cut_points: vec![CutPoint::new(0.6, "High Risk")],
            floor_label: "Safe".to_string(),
        }
    }

    pub fn classify(&self, probability: f64) -> &str {
        self.cut_points
            .iter()
            .find(|cut| probability > cut.above)
            .map(|cut| cut.label.as_str())
            .unwrap_or(self.floor_label.as_str())
    }

    pub fn cut_points(&self) -> &[CutPoint] {
        &self.cut_points
    }

    pub fn floor_label(&self) -> &str {
        &self.floor_label
    }

    /// Labels ordered from lowest to highest risk.
    pub fn labels(&self) -> Vec<&str> {
        std::iter::once(self.floor_label.as_str())
            .chain(self.cut_points.iter().rev().map(|cut| cut.label.as_str()))
            .collect()
    }
}
