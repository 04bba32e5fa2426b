/// Rendering only: every widget reads `AppState` and reports changes as
/// `Action`s for the app to dispatch after the frame is laid out.
pub mod panels;
pub mod plot;
pub mod table;
