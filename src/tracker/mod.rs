// Tracking consumer: polled order snapshots merged with live broadcasts

mod model;
mod poller;
mod view;

pub use model::{
    DeliveryAddress, DeliveryAgent, GeoPoint, OrderSnapshot, OrderStatus, ShopInfo, ShopOrder,
    ShopOrderItem,
};
pub use poller::OrderPoller;
pub use view::{RouteStats, TrackingView};
