mod controls;
mod details;
mod panels;

pub(super) use details::NodeDetails;
