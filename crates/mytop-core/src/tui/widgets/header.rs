//! Header bar: product, build and server identity.

use crate::models::ServerInfo;
use crate::tui::screen::Panel;

pub fn header_text(info: &ServerInfo) -> String {
    format!(
        " mytop {} ({}) | {} {} [{}:{}]",
        env!("CARGO_PKG_VERSION"),
        env!("MYTOP_BUILD_ID"),
        info.brand,
        info.version,
        info.hostname,
        info.port
    )
}

pub fn header(info: &ServerInfo) -> Panel {
    Panel::plain(header_text(info))
}
