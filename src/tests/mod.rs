// Test modules for Rentchat
// Each module contains extracted unit tests for the corresponding source file

mod api_tests;
mod composer_tests;
mod directory_tests;
mod protocol_tests;
