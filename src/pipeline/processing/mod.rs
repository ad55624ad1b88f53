// Pipeline processing: turning raw scraped text into typed items

pub mod normalize;
