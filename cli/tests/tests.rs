mod common;

mod test_config;
mod test_followers;

use common::TestCli;
