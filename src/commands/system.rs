pub fn print_help() {
    println!("\n🤖 Document Assistant Commands:");
    println!("  Just type your question about the documents");
    println!("  Examples:");
    println!("    - इस दस्तावेज़ का मुख्य विषय क्या है?");
    println!("    - Who is mentioned in the report?");
    println!();

    println!("📄 Knowledge Base Commands:");
    println!("  docs     - List the indexed documents");
    println!("  history  - Show recent questions and answers");
    println!();

    println!("⚙️ System Commands:");
    println!("  help  - Show this help menu");
    println!("  exit  - Exit the program");
    println!();
}
