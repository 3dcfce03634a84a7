#![cfg(test)]

mod fake_directory;
mod sync_scenarios;
