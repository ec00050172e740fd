mod content_resolver_tests;
