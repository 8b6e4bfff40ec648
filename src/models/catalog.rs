use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub unit: Option<String>,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisEntry {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl DiagnosisEntry {
    /// Display label used by the diagnosis picker, e.g. `"A10 - Cholera"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}
