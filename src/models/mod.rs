pub mod chat;
pub mod group;
pub mod mentorship;
pub mod notification;
pub mod professor;
pub mod research;
pub mod student;
pub mod user;

pub use chat::{ChatMessageView, GroupChatMessage, SenderType};
pub use group::{
    Group, GroupInvitation, GroupJoinRequest, GroupMember, GroupWithMentors, MemberRole,
    MentorSummary, ProposalStatus,
};
pub use mentorship::{MentorshipRequest, MentorshipRequestWithDetails};
pub use notification::{Notification, NotificationCreate};
pub use professor::{Professor, ProfessorWithUser};
pub use research::{ResearchPaper, ResearchPaperWithProfessors};
pub use student::{Student, StudentWithUser};
pub use user::{User, UserRole};
