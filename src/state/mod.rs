/// State management module
///
/// This module holds everything the user works on:
/// - Shared data structures (data.rs)
/// - Edit sub-mode state machine (edit.rs)
/// - Canva Mix board (canva.rs)
/// - Virtual tour frames (tour.rs)
/// - Utility tool blocks (utilities.rs)
/// - History items and the bounded log (history.rs)
/// - SQLite history catalog (library.rs)
/// - Area markers and masks drawn onto images (markup.rs)
/// - Mode switch table (transitions.rs)
/// - The session aggregate tying it together (session.rs)

pub mod canva;
pub mod data;
pub mod edit;
pub mod history;
pub mod library;
pub mod markup;
pub mod session;
pub mod tour;
pub mod transitions;
pub mod utilities;
