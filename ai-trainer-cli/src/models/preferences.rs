use serde::{Deserialize, Serialize};

/// User preferences read when asking for alternative exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub available_equipment: Vec<String>,
    #[serde(default = "default_fitness_level")]
    pub fitness_level: String,
    #[serde(default)]
    pub goal: String,
}

fn default_fitness_level() -> String {
    "intermediate".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            available_equipment: Vec::new(),
            fitness_level: default_fitness_level(),
            goal: String::new(),
        }
    }
}

impl Preferences {
    /// Equipment list for prompts; bodyweight only when nothing is configured
    pub fn equipment_or_default(&self) -> Vec<String> {
        if self.available_equipment.is_empty() {
            vec!["bodyweight".to_string()]
        } else {
            self.available_equipment.clone()
        }
    }
}
