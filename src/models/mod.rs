pub mod fashion;
