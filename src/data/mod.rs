// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches.
//
//   labeled .csv files                    .pdf files
//         │                                   │
//         ▼                                   ▼
//   CsvDatasetLoader                    PdfLineExtractor
//         │                                   │
//         ▼                                   │
//   Vocabulary::fit                           │
//         │                                   │
//         ▼                                   ▼
//   SequenceEncoder  ◄── one routine for both paths ──►
//         │
//         ▼
//   stratified_split → LineDataset → LineBatcher → DataLoader

/// Loads labeled `.csv` files and filters their rows
pub mod loader;

/// Extracts ordered text lines from PDF pages
pub mod pdf_lines;

/// Line tidying and token normalisation
pub mod preprocessor;

/// Append-only word → index mapping
pub mod vocabulary;

/// Text → fixed-length index sequence
pub mod encoder;

/// Burn Dataset of encoded samples, class weights
pub mod dataset;

/// Burn Batcher producing tensor batches
pub mod batcher;

/// Seeded stratified train/validation split
pub mod splitter;
