pub mod test_clone;
pub mod test_resize;
