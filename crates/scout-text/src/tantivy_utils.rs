use tantivy::tokenizer::{LowerCaser, TextAnalyzer, TokenStream, WhitespaceTokenizer};

/// Lower-case + whitespace split. No stemming, no stop words.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(LowerCaser)
		.build()
}

pub fn tokenize(text: &str) -> Vec<String> {
	let mut analyzer = build_analyzer();
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	stream.process(&mut |token| tokens.push(token.text.clone()));
	tokens
}

#[cfg(test)]
mod tests {
	use super::tokenize;

	#[test]
	fn splits_on_whitespace_and_lowercases() {
		assert_eq!(tokenize("Def  Foo():\n\tCALLS bar()"), vec!["def", "foo():", "calls", "bar()"]);
	}

	#[test]
	fn empty_input_has_no_tokens() {
		assert!(tokenize("   \n").is_empty());
	}
}
