use colored::Colorize;

use crate::knowledge_base::IndexStats;

pub fn print_documents(stats: &IndexStats) {
    println!("📚 Indexed documents ({}):", stats.documents.len());
    for doc in &stats.documents {
        let language = doc.language.as_deref().unwrap_or("unknown");
        println!(
            "  • {} [{}] {} characters, language: {}",
            doc.file_name.bright_yellow(),
            doc.kind,
            doc.characters.to_string().cyan(),
            language
        );
    }
    println!(
        "📊 {} chunks in the {} vector store",
        stats.chunks.to_string().cyan(),
        stats.backend
    );
    println!();
}
