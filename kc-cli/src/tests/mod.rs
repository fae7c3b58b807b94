
use kc_core::prelude::*;
use kc_testutils::*;
use rstest::*;

use super::*;
