pub mod preview_binding;
