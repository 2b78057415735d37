//! agent 节点的提示词构建

/// 提示词常量
pub mod consts {
    pub const PREAMBLE: &str =
        "You are an AI assistant designed to be helpful, harmless, and honest.";
    pub const PRIMARY_ROLE: &str = "Your primary role: {}";

    pub const KNOWLEDGE_INSTRUCTIONS: &[&str] = &[
        "IMPORTANT KNOWLEDGE BASE INSTRUCTIONS:",
        "- ONLY provide information that is explicitly available in the knowledge base",
        "- If the information is not in the knowledge base, CLEARLY state that",
        "- DO NOT make up or infer information",
        "- DO NOT use your general knowledge unless confirmed by the knowledge base",
    ];

    pub const TOOLS_INSTRUCTIONS: &[&str] = &[
        "IMPORTANT TOOLS INSTRUCTIONS:",
        "- You have access to external tools that can help you answer questions",
        "- Use these tools when appropriate to gather information",
        "- Format tool parameters as valid JSON",
    ];

    pub const AUGMENTED_QUERY: &str = "I need information about: {query}\n\nHere's some context that might help:\n{context}\n\nPlease use this context to provide a comprehensive answer.";

    pub const DEFAULT_ROLE: &str = "Answer the user's questions accurately.";
}

/// 系统提示词：固定前言 + 角色，按需追加知识库和工具说明
pub fn build_system_prompt(role: Option<&str>, with_knowledge: bool, with_tools: bool) -> String {
    let role = role
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(consts::DEFAULT_ROLE);

    let mut parts = vec![
        consts::PREAMBLE.to_string(),
        consts::PRIMARY_ROLE.replace("{}", role),
    ];
    if with_knowledge {
        parts.push(String::new());
        parts.extend(consts::KNOWLEDGE_INSTRUCTIONS.iter().map(|l| l.to_string()));
    }
    if with_tools {
        parts.push(String::new());
        parts.extend(consts::TOOLS_INSTRUCTIONS.iter().map(|l| l.to_string()));
    }
    parts.join("\n")
}

/// 按字符截断，不会切断多字节字符
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 用检索结果增强查询；上下文为空时返回 `None`
pub fn augment_query(query: &str, context: &str, limit: usize) -> Option<String> {
    let context = truncate_chars(context.trim(), limit);
    if context.is_empty() {
        return None;
    }
    Some(
        consts::AUGMENTED_QUERY
            .replace("{query}", query)
            .replace("{context}", context),
    )
}

/// 应用节点的用户提示词模板：含 `{query}` 时替换，否则作为前缀
pub fn apply_user_prompt(template: Option<&str>, query: &str) -> String {
    match template.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) if t.contains("{query}") => t.replace("{query}", query),
        Some(t) => format!("{t}\n\n{query}"),
        None => query.to_string(),
    }
}
