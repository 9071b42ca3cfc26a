pub mod feed;
pub mod gateway;

pub use feed::ReplayFeed;
pub use gateway::{PaperGateway, PaperPosition};
