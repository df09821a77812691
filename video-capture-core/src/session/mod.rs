pub mod manager;

#[cfg(test)]
pub(crate) mod test_support;
