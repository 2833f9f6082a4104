use ordercore_testing::order_store_contract_tests;

order_store_contract_tests! {
    suite = in_memory,
    make_store = ordercore_memory::InMemoryOrderStore::new,
}
