mod test_glare;
mod test_two_party;
