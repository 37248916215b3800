pub mod http_handlers;
pub mod middleware;
pub mod response;
pub mod routes;

#[cfg(test)]
mod tests;
