pub mod json_library;
