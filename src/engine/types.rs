use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub number: u32, // 1-based, document order
    pub text: String,
}
