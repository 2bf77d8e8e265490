pub mod xlsx_builder;
