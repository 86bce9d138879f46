pub mod linking; // Entity linking and label attribute extraction
pub mod advice; // Generator and auditor advice pipeline
