pub mod io;

pub use self::io::{read_from_stdin, read_token_from_stdin};
