//! Bundled actions.
//!
//! [`EchoAction`] reflects the request back as JSON and is what `serve`
//! binds when a route file names `echo`. [`WelcomeAction`] is the starter
//! HTML page.

mod echo;
mod welcome;

pub use echo::EchoAction;
pub use welcome::WelcomeAction;
