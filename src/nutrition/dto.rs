use serde::{Deserialize, Serialize};

/// Reply fields in the order the model is asked to produce them.
pub const NUTRIENT_KEYS: [&str; 6] = ["protein", "calories", "carbs", "fat", "sugar", "cholesterol"];

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// `data:<mime>;base64,<data>`
    pub image: String,
}

/// Free-text estimates exactly as the model wrote them (units included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutrientRecord {
    pub protein: String,
    pub calories: String,
    pub carbs: String,
    pub fat: String,
    pub sugar: String,
    pub cholesterol: String,
}
