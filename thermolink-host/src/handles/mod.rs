pub mod screen_handle;
