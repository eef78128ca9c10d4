//! The dashboard tiles and the horizontal tile view that holds them.

pub mod coin;
pub mod constants;
pub mod media;
pub mod page;
pub mod pairing;
pub mod system;
pub mod tile_view;

pub use coin::CoinPage;
pub use media::MediaPage;
pub use page::{Page, PageWrapper};
pub use pairing::PairingPage;
pub use system::SystemPage;
pub use tile_view::TileView;
