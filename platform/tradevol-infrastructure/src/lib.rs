pub mod trade_files;
