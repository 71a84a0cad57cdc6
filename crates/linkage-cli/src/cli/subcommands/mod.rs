mod link;
mod suggest;

pub use link::LinkCommands;
pub use suggest::SuggestCommands;
