mod redis_client_tests;
mod redis_token_store_tests;
