use super::test_helpers::*;
use super::*;

mod concurrency;
