use super::get_database_pool;
use crate::database::models::{
    Conversation, ConversationListResponse, ConversationSummary, CreateConversationRequest,
    EditMessageRequest, Message, SendMessageRequest, UpdateConversationRequest,
};
use sqlx::Error;
use uuid::Uuid;

/// Create a new conversation
pub async fn create_conversation(
    request: CreateConversationRequest,
    user_id: Uuid,
) -> Result<Conversation, Error> {
    // Placeholder - return dummy conversation
    Ok(Conversation {
        id: Uuid::new_v4(),
        user_id,
        title: request.title,
        assistant_id: request.assistant_id,
        model_provider_id: request.model_provider_id,
        model_id: request.model_id,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    })
}

/// Get conversation by ID
pub async fn get_conversation_by_id(
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Conversation>, Error> {
    // Placeholder - return dummy conversation
    Ok(Some(Conversation {
        id: conversation_id,
        user_id,
        title: "Test Conversation".to_string(),
        assistant_id: None,
        model_provider_id: None,
        model_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }))
}

/// List conversations for a user
pub async fn list_conversations(
    user_id: Uuid,
    page: i32,
    per_page: i32,
) -> Result<ConversationListResponse, Error> {
    // Placeholder - return empty list
    Ok(ConversationListResponse {
        conversations: vec![],
        total: 0,
        page,
        per_page,
    })
}

/// Update a conversation
pub async fn update_conversation(
    conversation_id: Uuid,
    request: UpdateConversationRequest,
    user_id: Uuid,
) -> Result<Option<Conversation>, Error> {
    // Placeholder - return dummy updated conversation
    Ok(Some(Conversation {
        id: conversation_id,
        user_id,
        title: request.title.unwrap_or_else(|| "Updated Conversation".to_string()),
        assistant_id: request.assistant_id,
        model_provider_id: request.model_provider_id,
        model_id: request.model_id,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }))
}

/// Delete a conversation
pub async fn delete_conversation(
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, Error> {
    // Placeholder - always return true
    Ok(true)
}

/// Send a message in a conversation
pub async fn send_message(
    request: SendMessageRequest,
    user_id: Uuid,
) -> Result<Message, Error> {
    // Placeholder - return dummy message
    Ok(Message {
        id: Uuid::new_v4(),
        conversation_id: Uuid::new_v4(),
        parent_id: request.parent_id,
        role: "user".to_string(),
        content: request.content,
        branch_id: Uuid::new_v4(),
        is_active_branch: true,
        model_provider_id: None,
        model_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        branches: None,
        metadata: None,
    })
}

/// Edit a message
pub async fn edit_message(
    message_id: Uuid,
    request: EditMessageRequest,
    user_id: Uuid,
) -> Result<Option<Message>, Error> {
    // Placeholder - return dummy message
    Ok(Some(Message {
        id: message_id,
        conversation_id: Uuid::new_v4(),
        parent_id: None,
        role: "user".to_string(),
        content: request.content,
        branch_id: Uuid::new_v4(),
        is_active_branch: true,
        model_provider_id: None,
        model_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        branches: None,
        metadata: None,
    }))
}

/// Search conversations
pub async fn search_conversations(
    user_id: Uuid,
    query: &str,
    page: i32,
    per_page: i32,
) -> Result<ConversationListResponse, Error> {
    // Placeholder - return empty list
    Ok(ConversationListResponse {
        conversations: vec![],
        total: 0,
        page,
        per_page,
    })
}