pub mod bubble;
pub mod bubble_list;
pub mod confirm;
pub mod help;
pub mod history;
pub mod input_box;
pub mod loading;
pub mod markdown;
pub mod models;
pub mod notice;
pub mod scroll;
pub mod syntaxes;
pub mod textarea;
pub mod utils;

pub use bubble::Bubble;
pub use bubble_list::BubbleList;

pub use help::HelpScreen;
pub use history::HistoryScreen;
pub use loading::Loading;
pub use models::ModelsScreen;
pub use notice::Notice;
pub use scroll::Scroll;
pub use textarea::build_textarea;
