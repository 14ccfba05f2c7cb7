mod transaction_test;
