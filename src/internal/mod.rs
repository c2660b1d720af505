mod bounded_window;
pub(crate) use bounded_window::BoundedWindow;
