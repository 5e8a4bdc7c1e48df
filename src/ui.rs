use tracing::{error, info};

/// User-facing messages. Errors are blocking in an editor; a terminal
/// host just prints them.
pub trait Messenger {
    fn error_message(&self, message: &str);
    fn status_message(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    fn error_message(&self, message: &str) {
        error!("{message}");
        eprintln!("error: {message}");
    }

    fn status_message(&self, message: &str) {
        info!("{message}");
        println!("{message}");
    }
}
